mod tracker;

pub use tracker::ActiveDishViewers;
