pub mod matching;
pub mod placement;
pub mod portal;
pub mod ranking;
pub mod rows;
