pub mod airport;
pub mod city;
pub mod country;
pub mod covid;
pub mod currency;
pub mod flight;
pub mod forex;
pub mod hospital;
pub mod passenger;
pub mod ticket_buy;
pub mod user;
