mod memory_repository;
mod postgres_repository;

#[cfg(test)]
mod tests;

pub use memory_repository::MemoryRepository;
pub use postgres_repository::{create_postgres_repository, PostgresRepository};
