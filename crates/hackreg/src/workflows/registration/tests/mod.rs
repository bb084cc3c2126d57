mod common;
mod notification;
