
use std::rc::Rc;

use predict_core::db::{PredictDb, RawData, RawEntry};
use tempfile::TempDir;

use crate::{
    Context, PredictEngine, PredictTranslator, Predictor, PublishMode, Session, PREDICTION_OPTION,
};

/// A loaded database that lives as long as its temp directory.
pub(super) struct TestDb {
    _dir: TempDir,
    pub db: Rc<PredictDb>,
}

pub(super) fn sample_data() -> RawData {
    let entries = [
        ("$", vec![("我", 3.0), ("你", 2.0)]),
        ("我", vec![("们", 5.0), ("的", 4.0), ("是", 3.0), ("想", 1.0)]),
        ("们", vec![("的", 3.0)]),
        ("的", vec![("人", 2.0)]),
        ("人", vec![("们", 1.0)]),
        ("好", vec![("的", 1.0)]),
    ];
    entries
        .into_iter()
        .map(|(key, candidates)| {
            let candidates: Vec<RawEntry> = candidates
                .into_iter()
                .map(|(text, weight)| RawEntry::new(text, weight))
                .collect();
            (key.to_string(), candidates)
        })
        .collect()
}

pub(super) fn load_test_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predict.db");
    let mut writer = PredictDb::new(&path);
    writer.build(&sample_data()).unwrap();
    writer.save().unwrap();
    drop(writer);

    let mut db = PredictDb::new(&path);
    db.load().unwrap();
    TestDb {
        _dir: dir,
        db: Rc::new(db),
    }
}

pub(super) fn make_engine(
    test_db: &TestDb,
    max_iterations: usize,
    max_candidates: usize,
) -> Rc<PredictEngine> {
    Rc::new(PredictEngine::new(
        Rc::clone(&test_db.db),
        max_iterations,
        max_candidates,
    ))
}

/// Session with prediction enabled and the initial update not yet delivered.
pub(super) fn make_session_pending(engine: &Rc<PredictEngine>, mode: PublishMode) -> Session {
    let mut ctx = Context::new();
    ctx.set_option(PREDICTION_OPTION, true);
    let mut session = Session::new(ctx);
    session.add_processor(Box::new(Predictor::new(Some(Rc::clone(engine)), mode)));
    if mode == PublishMode::Placeholder {
        session.add_translator(Box::new(PredictTranslator::new(Some(Rc::clone(engine)))));
    }
    session
}

/// Session after the initial update, i.e. showing the start-of-session
/// prediction.
pub(super) fn make_session(engine: &Rc<PredictEngine>, mode: PublishMode) -> Session {
    let mut session = make_session_pending(engine, mode);
    session.dispatch_updates();
    session
}

/// Texts of the menu on the last segment, if any.
pub(super) fn menu_texts(session: &Session) -> Vec<String> {
    session
        .context()
        .composition()
        .back()
        .and_then(|segment| segment.menu.as_ref())
        .map(|menu| menu.candidates().iter().map(|c| c.text.clone()).collect())
        .unwrap_or_default()
}

pub(super) fn shows_prediction(session: &Session) -> bool {
    session
        .context()
        .composition()
        .back()
        .is_some_and(|segment| segment.has_tag(crate::PREDICTION_TAG))
}
