pub mod via;
