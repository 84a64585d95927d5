pub mod topic_manager;
