pub mod nonstandard;

pub mod phase0 {
    pub mod containers;
    pub mod primitives;
}
