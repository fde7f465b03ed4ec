mod driver;
mod exrc;
mod teardown;
