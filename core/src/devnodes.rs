//! # Device Nodes
//!
//! Populates `/dev` with the special nodes the machine's device classes
//! call for. Every step is existence-probe-then-create, so the whole
//! pass is idempotent: rerunning it against a populated tree changes
//! nothing and reports success.

use alloc::format;
use log::debug;
use mica_fs::vfs::NodeKind;
use mica_fs::{DeviceId, FsError, FsResult, OpenFlags, Vfs};

/// Create the standard `/dev` tree for `nterms` terminals and `ndisks`
/// disks
pub fn populate(vfs: &mut Vfs, nterms: usize, ndisks: usize) -> FsResult<()> {
    match vfs.lookup("/dev") {
        Ok(_) => {}
        Err(FsError::NotFound) => {
            vfs.mkdir("/dev")?;
        }
        Err(err) => return Err(err),
    }

    ensure(vfs, "/dev/null", NodeKind::CharDevice(DeviceId::NULL))?;
    ensure(vfs, "/dev/zero", NodeKind::CharDevice(DeviceId::ZERO))?;
    for n in 0..nterms {
        let path = format!("/dev/tty{}", n);
        ensure(vfs, &path, NodeKind::CharDevice(DeviceId::tty(n as u16)))?;
    }
    for n in 0..ndisks {
        let path = format!("/dev/hda{}", n);
        ensure(vfs, &path, NodeKind::BlockDevice(DeviceId::disk(n as u16)))?;
    }
    debug!("devnodes: /dev populated ({} terms, {} disks)", nterms, ndisks);
    Ok(())
}

/// Create `path` unless it already exists
fn ensure(vfs: &mut Vfs, path: &str, kind: NodeKind) -> FsResult<()> {
    match vfs.open(path, OpenFlags::READ) {
        Ok(handle) => {
            vfs.close(handle);
            Ok(())
        }
        Err(FsError::NotFound) => vfs.mknod(path, kind).map(|_| ()),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populates_the_standard_tree() {
        let mut vfs = Vfs::new();
        populate(&mut vfs, 3, 2).unwrap();
        for path in ["/dev", "/dev/null", "/dev/zero", "/dev/tty2", "/dev/hda1"] {
            assert!(vfs.lookup(path).is_ok(), "{} missing", path);
        }
        assert_eq!(vfs.lookup("/dev/tty3"), Err(FsError::NotFound));
        // probes leave no references behind
        assert_eq!(vfs.live_refs(), 0);
    }

    #[test]
    fn second_pass_changes_nothing() {
        let mut vfs = Vfs::new();
        populate(&mut vfs, 2, 1).unwrap();
        let count = vfs.node_count();
        populate(&mut vfs, 2, 1).unwrap();
        assert_eq!(vfs.node_count(), count);
    }
}
