/// Stable opaque identifier assigned by the backing store (`_rid`)
pub type ResourceRid = String;
/// User-facing identifier of a database, mutable via rename
pub type DatabaseId = String;
/// User-facing identifier of a collection, unique within its database
pub type CollectionId = String;
/// User-facing identifier of a stored procedure, trigger or UDF
pub type SubResourceId = String;
pub type Throughput = u32;
