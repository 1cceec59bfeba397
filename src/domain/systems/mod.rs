// Simulation systems that advance domain state.

pub mod physics;
