pub mod getjp;
