pub mod board;
pub mod reconciler;
