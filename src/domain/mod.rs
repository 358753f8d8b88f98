// Domain layer - Pipe records and the view models derived from them
pub mod chart;
pub mod dashboard;
pub mod noise;
pub mod pipe;
pub mod risk;
pub mod risk_map;
pub mod trend;
pub mod widgets;
