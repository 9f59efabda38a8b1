mod timeline;
mod topologies;
