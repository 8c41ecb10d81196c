//! The LSTM network: parameters, the per-timestep node, losses and the
//! sequence controller that ties them together.

pub mod init;
pub mod layers;
pub mod losses;
pub mod network;
pub mod params;
pub mod trainer;

pub use init::Initializer;
pub use layers::lstm::Node;
pub use losses::{LossLayer, ProductSquareLoss, SquaredErrorLoss};
pub use network::Network;
pub use params::{Gate, GateParams, LstmConfig, ParameterSet};
pub use trainer::Trainer;
