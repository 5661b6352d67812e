pub mod transport_probe;

pub use transport_probe::TransportProbeTask;
