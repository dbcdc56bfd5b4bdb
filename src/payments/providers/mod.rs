pub mod qris;
