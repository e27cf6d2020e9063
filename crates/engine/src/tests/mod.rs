mod helpers;

mod import_tests;
mod keys_tests;
