pub mod request;
pub mod tablet;

#[cfg(test)]
mod tablet_test;
