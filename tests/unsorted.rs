use mdf_records::{
    ChannelArray, Error, LayoutSet, RecordLayout, Result, SignalType, SplitOutput,
    UnsortedSplitter,
};

/// Group 1: u32 counter in 4-byte records.
/// Group 2: i16 temperature and u32 timestamp in 6-byte records.
/// Group 3: VLSD text.
fn splitter() -> Result<UnsortedSplitter> {
    let mut counter = LayoutSet::new();
    counter.push("counter", RecordLayout::new(SignalType::UnsignedInt, 32, 4));

    let mut climate = LayoutSet::new();
    climate.push("temperature", RecordLayout::new(SignalType::SignedInt, 16, 6));
    climate.push(
        "timestamp",
        RecordLayout::new(SignalType::UnsignedInt, 32, 6).at(2, 0),
    );

    let mut splitter = UnsortedSplitter::new(1)?;
    splitter.add_fixed_group(1, 4, counter)?;
    splitter.add_fixed_group(2, 6, climate)?;
    splitter.add_vlsd_group(3, "message", SignalType::Utf8String)?;
    Ok(splitter)
}

fn fixed1(stream: &mut Vec<u8>, counter: u32) {
    stream.push(1);
    stream.extend_from_slice(&counter.to_le_bytes());
}

fn fixed2(stream: &mut Vec<u8>, temperature: i16, timestamp: u32) {
    stream.push(2);
    stream.extend_from_slice(&temperature.to_le_bytes());
    stream.extend_from_slice(&timestamp.to_le_bytes());
}

fn vlsd3(stream: &mut Vec<u8>, message: &str) {
    stream.push(3);
    stream.extend_from_slice(&(message.len() as u32).to_le_bytes());
    stream.extend_from_slice(message.as_bytes());
}

fn values<'a>(output: &'a SplitOutput, name: &str) -> &'a ChannelArray {
    &output.get(name).unwrap().values
}

#[test]
fn interleaved_fixed_and_vlsd_records() -> Result<()> {
    let mut stream = Vec::new();
    fixed1(&mut stream, 100);
    vlsd3(&mut stream, "start");
    fixed2(&mut stream, -40, 1000);
    fixed1(&mut stream, 101);
    fixed2(&mut stream, 25, 2000);
    vlsd3(&mut stream, "ok");
    fixed1(&mut stream, 102);

    let output = splitter()?.split(&stream);
    assert!(output.is_complete());
    assert_eq!(
        values(&output, "counter"),
        &ChannelArray::UInt32(vec![100, 101, 102])
    );
    assert_eq!(
        values(&output, "temperature"),
        &ChannelArray::Int16(vec![-40, 25])
    );
    assert_eq!(
        values(&output, "timestamp"),
        &ChannelArray::UInt32(vec![1000, 2000])
    );
    match values(&output, "message") {
        ChannelArray::Text(text) => {
            assert_eq!(text.width(), 5);
            assert_eq!(text.get(0), Some("start"));
            assert_eq!(text.get(1), Some("ok   "));
        }
        other => panic!("unexpected {other:?}"),
    }

    let names: Vec<&str> = output.channels.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["counter", "temperature", "timestamp", "message"]);
    Ok(())
}

#[test]
fn truncation_inside_vlsd_length_keeps_completed_records() -> Result<()> {
    let mut stream = Vec::new();
    fixed1(&mut stream, 7);
    fixed2(&mut stream, 3, 9);
    vlsd3(&mut stream, "whole");
    let cut_at = stream.len();
    // id plus two bytes of the four-byte length
    stream.extend_from_slice(&[3, 10, 0]);

    let output = splitter()?.split(&stream);
    match output.error {
        Some(Error::TruncatedStream {
            offset,
            needed,
            available,
        }) => {
            assert_eq!(offset, cut_at);
            assert_eq!(needed, 5);
            assert_eq!(available, 3);
        }
        ref other => panic!("unexpected {other:?}"),
    }
    assert_eq!(values(&output, "counter"), &ChannelArray::UInt32(vec![7]));
    assert_eq!(values(&output, "temperature"), &ChannelArray::Int16(vec![3]));
    assert_eq!(values(&output, "message").len(), 1);
    assert!(output.into_result().is_err());
    Ok(())
}

#[test]
fn truncation_inside_fixed_record() -> Result<()> {
    let mut stream = Vec::new();
    fixed2(&mut stream, 1, 2);
    stream.extend_from_slice(&[2, 0xAA, 0xBB]);

    let output = splitter()?.split(&stream);
    assert!(matches!(
        output.error,
        Some(Error::TruncatedStream {
            offset: 7,
            needed: 7,
            available: 3
        })
    ));
    assert_eq!(values(&output, "timestamp"), &ChannelArray::UInt32(vec![2]));
    Ok(())
}

#[test]
fn unknown_record_id() -> Result<()> {
    let mut stream = Vec::new();
    fixed1(&mut stream, 1);
    stream.push(42);
    fixed1(&mut stream, 2);

    let output = splitter()?.split(&stream);
    assert!(matches!(
        output.error,
        Some(Error::UnknownRecordId {
            record_id: 42,
            offset: 5
        })
    ));
    assert_eq!(values(&output, "counter"), &ChannelArray::UInt32(vec![1]));
    Ok(())
}

#[test]
fn wide_record_ids() -> Result<()> {
    let mut layouts = LayoutSet::new();
    layouts.push("v", RecordLayout::new(SignalType::UnsignedInt, 8, 1));
    let mut splitter = UnsortedSplitter::new(8)?;
    splitter.add_fixed_group(0x0102_0304_0506_0708, 1, layouts)?;

    let mut stream = Vec::new();
    for v in [5u8, 6] {
        stream.extend_from_slice(&0x0102_0304_0506_0708u64.to_le_bytes());
        stream.push(v);
    }
    let channels = splitter.split(&stream).into_result()?;
    assert_eq!(channels[0].values, ChannelArray::UInt8(vec![5, 6]));
    Ok(())
}

#[test]
fn unsupported_record_id_size() {
    assert!(matches!(
        UnsortedSplitter::new(3),
        Err(Error::UnsupportedRecordIdSize(3))
    ));
}

#[test]
fn vlsd_length_past_end_of_stream() -> Result<()> {
    let mut stream = Vec::new();
    fixed1(&mut stream, 11);
    stream.extend_from_slice(&[3, 0xFF, 0xFF, 0xFF, 0xFF, b'x', b'y']);

    let output = splitter()?.split(&stream);
    match output.error {
        Some(Error::TruncatedStream {
            offset,
            needed,
            available,
        }) => {
            assert_eq!(offset, 5);
            assert_eq!(needed, 5usize.saturating_add(u32::MAX as usize));
            assert_eq!(available, 7);
        }
        ref other => panic!("unexpected {other:?}"),
    }
    assert_eq!(values(&output, "counter"), &ChannelArray::UInt32(vec![11]));
    assert!(values(&output, "message").is_empty());
    Ok(())
}
