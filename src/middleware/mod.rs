pub mod cron_auth;
