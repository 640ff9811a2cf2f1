mod manager;

pub use manager::SelectionShadow;
