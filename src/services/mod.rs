// Services module

pub mod firestore;
pub mod places;
pub mod subscriptions;

pub use firestore::FirestoreService;
pub use places::PlacesService;
pub use subscriptions::{watch, Subscription};
