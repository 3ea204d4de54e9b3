mod connection;
mod dispatch;
mod shell;
mod support;
