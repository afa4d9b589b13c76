pub mod mem_repo;
