use std::ffi::{CStr, CString};
use std::ptr;

use anyhow::{bail, Context, Result};
use tracing::debug;

use access_policy::GroupResolver;

/// Initial capacity for the supplementary group list.  When the first
/// `getgrouplist` call reports more groups than this, one retry is made
/// with the reported size.
const INITIAL_GROUP_SLOTS: libc::c_int = 30;

/// Upper bound for the scratch buffers of the reentrant NSS calls.
const MAX_NSS_BUF: usize = 1 << 16;

/// Group-membership resolver backed by the host NSS stack (`getpwnam_r`,
/// `getgrouplist`, `getgrgid_r`), so local groups, LDAP and sssd-backed
/// directories all answer through the same calls.
#[derive(Debug, Default)]
pub struct NssGroupResolver;

impl GroupResolver for NssGroupResolver {
    fn resolve(&self, group: &str, login: &str) -> Result<Vec<String>> {
        // Group "ALL" means everyone.
        if group == "ALL" {
            return Ok(vec![login.to_string()]);
        }

        for gid in group_ids(login)? {
            if group_name(gid).as_deref() == Some(group) {
                debug!(login, group, "login is a member");
                return Ok(vec![login.to_string()]);
            }
        }
        Ok(Vec::new())
    }
}

/// All group ids `login` belongs to, primary group included.
fn group_ids(login: &str) -> Result<Vec<libc::gid_t>> {
    let name = CString::new(login).context("login name contains NUL")?;
    let gid = primary_gid(&name, login)?;

    let mut ngroups = INITIAL_GROUP_SLOTS;
    let mut groups = vec![0 as libc::gid_t; INITIAL_GROUP_SLOTS as usize];
    let mut rc =
        unsafe { libc::getgrouplist(name.as_ptr(), gid, groups.as_mut_ptr(), &mut ngroups) };
    if rc < 0 {
        // The failed call put the real group count in `ngroups`; retry once
        // with a buffer of that size.
        groups = vec![0 as libc::gid_t; ngroups.max(1) as usize];
        rc = unsafe { libc::getgrouplist(name.as_ptr(), gid, groups.as_mut_ptr(), &mut ngroups) };
        if rc < 0 {
            bail!("getgrouplist failed twice for '{login}'");
        }
    }
    groups.truncate(ngroups as usize);
    Ok(groups)
}

/// Primary group id of `login` via `getpwnam_r`.
fn primary_gid(name: &CStr, login: &str) -> Result<libc::gid_t> {
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = ptr::null_mut();
    let mut buf = vec![0 as libc::c_char; 1024];

    loop {
        let rc = unsafe {
            libc::getpwnam_r(
                name.as_ptr(),
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < MAX_NSS_BUF {
            let next = buf.len() * 2;
            buf.resize(next, 0);
            continue;
        }
        if rc != 0 {
            bail!("passwd lookup failed for '{login}' (errno {rc})");
        }
        if result.is_null() {
            bail!("unknown login '{login}'");
        }
        return Ok(pwd.pw_gid);
    }
}

/// Group name for `gid`, or `None` when the id does not resolve.
fn group_name(gid: libc::gid_t) -> Option<String> {
    let mut grp: libc::group = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::group = ptr::null_mut();
    let mut buf = vec![0 as libc::c_char; 1024];

    loop {
        let rc = unsafe {
            libc::getgrgid_r(gid, &mut grp, buf.as_mut_ptr(), buf.len(), &mut result)
        };
        if rc == libc::ERANGE && buf.len() < MAX_NSS_BUF {
            let next = buf.len() * 2;
            buf.resize(next, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        let name = unsafe { CStr::from_ptr(grp.gr_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}
