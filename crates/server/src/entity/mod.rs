pub mod ip_reputation;
