pub mod reconcile;
pub mod state;
