
mod availability_test;
mod middleware_test;
