pub mod duplication;
