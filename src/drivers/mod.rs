pub mod wacom;
