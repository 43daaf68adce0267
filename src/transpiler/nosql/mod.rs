// NoSQL renderers
pub mod couch;
pub mod dynamo;
pub mod firestore;
pub mod mongo;
