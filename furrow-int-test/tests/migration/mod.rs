mod fjall_store_test;
mod migrator_test;
mod scenario_test;
