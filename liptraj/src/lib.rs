// src/lib.rs
pub mod error;

pub mod data {
    pub mod trajectory;
    pub mod leaflets;
    pub mod io;
}

pub mod analysis {
    pub mod config;
    pub mod neighbours;
    pub mod flipflop;
}
