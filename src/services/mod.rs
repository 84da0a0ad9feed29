//! Background services that connect the editing engine to the outside world.

pub mod persistence;
