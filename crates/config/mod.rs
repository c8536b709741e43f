pub mod policy_loader;
