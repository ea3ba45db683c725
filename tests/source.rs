use orderflow::testing::{Gather, assert_collections_equal};
use orderflow::*;
use std::thread;
use std::time::Duration;

#[test]
fn source_assigns_consecutive_indices() -> anyhow::Result<()> {
    let source = IncrementalProcessingSource::new(LogContext::new("source"));
    source.add_all(["a", "b", "c"])?;
    source.close()?;

    let indices: Vec<Index> = source.buffer().processing_iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![Index::top(0), Index::top(1), Index::top(2)]);
    Ok(())
}

#[test]
fn add_after_close_fails() -> anyhow::Result<()> {
    let source = IncrementalProcessingSource::default();
    source.add(1)?;
    source.close()?;
    assert!(source.is_closed());
    assert_eq!(source.add(2), Err(ProcessingError::SourceClosed));
    assert_eq!(source.close(), Err(ProcessingError::AlreadyClosed));
    Ok(())
}

#[test]
fn chain_consumes_source_while_it_is_fed() -> anyhow::Result<()> {
    let source = IncrementalProcessingSource::default();
    let result = parallel(3).map(|x: &i32| x * 2).process(&source);
    let gather = Gather::start(result);

    let producer = source.clone();
    let feeder = thread::spawn(move || -> Result<(), ProcessingError> {
        for i in 0..10 {
            producer.add(i)?;
            thread::sleep(Duration::from_millis(1));
        }
        producer.close()
    });

    feeder.join().map_err(|_| anyhow::anyhow!("feeder panicked"))??;
    let expected: Vec<i32> = (0..10).map(|x| x * 2).collect();
    assert_collections_equal(&gather.finish(), &expected);
    Ok(())
}

#[test]
fn sequential_chain_over_source_waits_for_close() -> anyhow::Result<()> {
    let source = IncrementalProcessingSource::default();
    let chain = filter(|s: &String| !s.is_empty());
    let producer = source.clone();
    let feeder = thread::spawn(move || {
        let _ = producer.add_all(["x".to_string(), String::new(), "y".to_string()]);
        let _ = producer.close();
    });

    let out = chain.process(&source).to_vec();
    feeder.join().map_err(|_| anyhow::anyhow!("feeder panicked"))?;
    assert_collections_equal(&out, &["x".to_string(), "y".to_string()]);
    Ok(())
}
