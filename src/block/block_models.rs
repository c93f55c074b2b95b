use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Directed block: `blocker` no longer accepts messages from `blocked`.
/// Either direction between two conversation participants disables
/// sending by the blocked direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct BlockRelation {
    pub blocker: Uuid,
    pub blocked: Uuid,
}
