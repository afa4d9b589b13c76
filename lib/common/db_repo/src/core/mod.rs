pub mod db_repo;
