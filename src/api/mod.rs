pub mod city;
pub mod covid;
pub mod forex;
pub mod hospital;
pub mod openapi;
pub mod ticket;
pub mod travel;
