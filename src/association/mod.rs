pub mod chain;
pub mod errors;
pub mod hop;
pub mod join_keys;
pub mod owner;

pub use chain::{Chain, ResolvedHop};
pub use errors::{KeySide, ResolveError};
pub use hop::{ConstraintBlock, Hop, JoinKeys, KeyMetadata, PolymorphicType};
pub use join_keys::keys_for;
pub use owner::Owner;
