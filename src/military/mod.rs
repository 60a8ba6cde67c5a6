pub mod brain;
pub mod cluster;
pub mod damage;
pub mod dbscan;
pub mod emitter;
pub mod potential;
pub mod squadron;
pub mod threatmap;
pub mod unittype;
