pub mod catalog;
pub mod editor;
pub mod gateway;
pub mod handler;
pub mod local;
pub mod models;
pub mod remote;
mod repository;
pub mod service;
