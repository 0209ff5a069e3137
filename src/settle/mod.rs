pub mod waiter;
