pub mod munin;
