pub mod channels;
pub mod runs;
pub mod serve;
