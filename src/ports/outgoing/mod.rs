pub mod cluster_admin;
