pub mod decay;
pub mod enrich;
pub mod insights;
pub mod saves;
pub mod search;
