//! Identifier collision specs
//!
//! Verify that an existing entry is never disturbed by a new call.

use crate::prelude::*;

fn constant_journal(dir: &JournalDir) -> Journal<FixedIdGen> {
    Journal::new(JournalConfig::new(dir.path()), FixedIdGen::new("constant"))
}

#[test]
fn colliding_call_does_not_overwrite_existing_entry() {
    let dir = JournalDir::new();
    dir.plant("constant", b"hello");
    let rec = Recoverable::with_journal(constant_journal(&dir), |_: &[u8]| {
        Err::<(), _>(ValueError)
    });

    let err = rec.call(b"blabla").unwrap_err();

    assert!(matches!(err, RecoverableError::Transform(ValueError)));
    dir.assert_single_entry(b"hello");
}

#[test]
fn colliding_call_retries_with_fresh_ids() {
    let dir = JournalDir::new();
    dir.plant("job-1", b"hello");
    dir.plant("job-2", b"world");
    let journal = Journal::new(JournalConfig::new(dir.path()), SequentialIdGen::new("job"));
    let rec = Recoverable::with_journal(journal, |_: &[u8]| Err::<(), _>(ValueError));

    let _ = rec.call(b"third");

    assert_eq!(
        dir.entries(),
        vec!["job-1".to_string(), "job-2".to_string(), "job-3".to_string()]
    );
    assert_eq!(std::fs::read(dir.entry("job-1")).unwrap(), b"hello");
    assert_eq!(std::fs::read(dir.entry("job-3")).unwrap(), b"third");
}

#[test]
fn exhausted_call_fails_loudly_when_configured() {
    let dir = JournalDir::new();
    dir.plant("constant", b"hello");
    let config = JournalConfig::new(dir.path()).with_on_exhausted(ExhaustedPolicy::Fail);
    let rec = Recoverable::with_journal(
        Journal::new(config, FixedIdGen::new("constant")),
        |_: &[u8]| Ok::<_, ValueError>(()),
    );

    let err = rec.call(b"blabla").unwrap_err();

    assert!(matches!(
        err,
        RecoverableError::Journal(JournalError::CreationExhausted { attempts: 5 })
    ));
    dir.assert_single_entry(b"hello");
}

#[test]
fn config_loaded_from_toml_drives_policy() {
    let dir = JournalDir::new();
    dir.plant("constant", b"hello");
    let toml = format!(
        "directory = {:?}\nmax_attempts = 2\non_exhausted = \"fail\"\n",
        dir.path().display().to_string()
    );
    let config = JournalConfig::from_toml_str(&toml).unwrap();
    let rec = Recoverable::with_journal(
        Journal::new(config, FixedIdGen::new("constant")),
        |_: &[u8]| Ok::<_, ValueError>(()),
    );

    let err = rec.call(b"blabla").unwrap_err();

    assert!(matches!(
        err,
        RecoverableError::Journal(JournalError::CreationExhausted { attempts: 2 })
    ));
}
