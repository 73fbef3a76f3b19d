pub mod graph_entity;
pub mod graph_relationship;
pub mod query_result;
pub mod source;

pub use graph_entity::{EntityObservation, GraphEntity, UNKNOWN_TYPE};
pub use graph_relationship::{GraphRelationship, RelationshipObservation};
pub use query_result::{ContextBucket, EntityContext, QueryResult, RelationshipContext, SourceContext};
pub use source::Source;
