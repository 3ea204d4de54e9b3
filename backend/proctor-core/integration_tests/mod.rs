mod bus;
mod helpers;
mod offline;
mod submission;
